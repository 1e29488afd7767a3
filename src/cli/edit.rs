use std::io::Write;

use anyhow::{Context, Result};
use log::{debug, info};

use super::command::EditArgs;
use crate::input::{InputReader, open_output};
use crate::snapshot::Snapshot;
use codecpar::structs::channel_layout::ChannelLayout;
use codecpar::structs::parameters::CodecParameters;

pub fn cmd_edit(args: &EditArgs) -> Result<()> {
    let mut input = InputReader::new(&args.input)?;
    if input.is_pipe() {
        debug!("Reading snapshot from stdin");
    }
    let data = input.read_all()?;
    let mut params = Snapshot::from_slice(&data)?.to_parameters()?;

    apply_edits(&mut params, args)?;

    let yaml = Snapshot::from_parameters(&params)?.to_yaml()?;
    let mut output = open_output(args.output.as_deref())?;
    output.write_all(yaml.as_bytes())?;
    output.flush()?;

    if let Some(path) = &args.output {
        info!("Wrote codec parameters to {}", path.display());
    }
    Ok(())
}

fn apply_edits(params: &mut CodecParameters, args: &EditArgs) -> Result<()> {
    if let Some(width) = args.width {
        params.set_width(width)?;
    }
    if let Some(height) = args.height {
        params.set_height(height)?;
    }
    if let Some(bit_rate) = args.bit_rate {
        params.set_bit_rate(bit_rate);
    }
    if let Some(sample_rate) = args.sample_rate {
        params.set_sample_rate(sample_rate)?;
    }
    if let Some(text) = &args.channel_layout {
        let layout: ChannelLayout = text.parse()?;
        debug!("Setting channel layout to {layout}");
        params.set_channel_layout(&layout)?;
    }
    if args.clear_extradata {
        params.clear_extradata();
    }
    if let Some(text) = &args.extradata {
        let data = hex::decode(text.trim()).context("--extradata is not valid hex")?;
        if data.is_empty() {
            log::warn!("Empty --extradata keeps the existing extra data; use --clear-extradata");
        }
        params.set_extradata(&data)?;
    }
    Ok(())
}
