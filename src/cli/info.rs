use anyhow::Result;

use super::command::InfoArgs;
use crate::input::InputReader;
use crate::snapshot::Snapshot;
use codecpar::structs::parameters::CodecParameters;
use codecpar::structs::values::MediaType;

pub fn cmd_info(args: &InfoArgs) -> Result<()> {
    log::info!("Reading codec parameters: {}", args.input.display());

    let data = InputReader::new(&args.input)?.read_all()?;
    let params = Snapshot::from_slice(&data)?.to_parameters()?;

    print_parameters(&params)?;
    Ok(())
}

fn print_parameters(params: &CodecParameters) -> Result<()> {
    println!("Codec Parameters");
    println!("  Media type                {}", params.codec_type());
    println!("  Codec                     {}", params.codec_id());
    println!("  Codec tag                 {}", params.codec_tag());
    if params.bit_rate() > 0 {
        println!("  Bit rate                  {} kb/s", params.bit_rate() / 1000);
    }
    println!("  Profile                   {}", params.profile());
    println!("  Level                     {}", params.level());
    println!();

    match params.codec_type() {
        MediaType::VIDEO => print_video(params),
        MediaType::AUDIO => print_audio(params)?,
        MediaType::SUBTITLE => {
            println!("Subtitle");
            println!("  Size                      {}x{}", params.width(), params.height());
            println!();
        }
        _ => {}
    }

    print_extradata(params);
    Ok(())
}

fn print_video(params: &CodecParameters) {
    println!("Video");
    println!("  Size                      {}x{}", params.width(), params.height());
    println!("  Pixel format              {}", params.pixel_format());
    println!("  Sample aspect ratio       {}", params.sample_aspect_ratio());
    if let Some(fps) = params.framerate().to_f64() {
        println!("  Frame rate                {} ({fps:.3} fps)", params.framerate());
    }
    println!("  Field order               {}", params.field_order());
    println!(
        "  Color                     {} / {} / {} / {}",
        params.color_range(),
        params.color_primaries(),
        params.color_trc(),
        params.color_space()
    );
    println!("  Chroma location           {}", params.chroma_location());
    println!("  Video delay               {}", params.video_delay());
    println!();
}

fn print_audio(params: &CodecParameters) -> Result<()> {
    let layout = params.channel_layout()?;

    println!("Audio");
    println!("  Sample format             {}", params.sample_format());
    println!("  Sample rate               {} Hz", params.sample_rate());
    println!("  Channels                  {}", layout.nb_channels());
    println!("  Channel layout            {layout}");
    if params.frame_size() > 0 {
        println!("  Frame size                {}", params.frame_size());
    }
    if params.block_align() > 0 {
        println!("  Block align               {}", params.block_align());
    }
    if params.initial_padding() > 0 || params.trailing_padding() > 0 {
        println!(
            "  Padding                   {} initial, {} trailing",
            params.initial_padding(),
            params.trailing_padding()
        );
    }
    if params.seek_preroll() > 0 {
        println!("  Seek preroll              {}", params.seek_preroll());
    }
    println!();
    Ok(())
}

fn print_extradata(params: &CodecParameters) {
    match params.extradata() {
        Some(data) => {
            const PREVIEW: usize = 16;
            let preview = hex::encode(&data[..data.len().min(PREVIEW)]);
            let ellipsis = if data.len() > PREVIEW { "..." } else { "" };
            println!("Extra data                  {} bytes ({preview}{ellipsis})", data.len());
        }
        None => println!("Extra data                  none"),
    }
}
