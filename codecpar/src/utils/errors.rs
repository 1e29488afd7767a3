#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    #[error("Failed to allocate a native buffer of {size} bytes")]
    Exhausted { size: usize },

    #[error("Native buffer of {len} elements exceeds the addressable size")]
    CapacityOverflow { len: usize },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParametersError {
    #[error(transparent)]
    Allocation(#[from] AllocError),

    #[error("{field} = {value} does not fit the native field width")]
    OutOfRange { field: &'static str, value: i64 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelLayoutError {
    #[error(transparent)]
    Allocation(#[from] AllocError),

    #[error("Unable to parse channel layout \"{0}\"")]
    Parse(String),

    #[error("A custom channel layout needs at least one channel")]
    Empty,

    #[error("Channel layout has too many channels: {0}")]
    TooManyChannels(u64),

    #[error("Channel name \"{0}\" contains one of '+', '@', '(' or ')'")]
    InvalidName(String),

    #[error("Only custom channel layouts carry a per-channel map")]
    NotCustom,

    #[error("Channel index {index} out of range for a {len}-channel layout")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Codec parameters at slot {index} (generation {generation}) were already released")]
    UseAfterRelease { index: u32, generation: u32 },

    #[error("Handle refers to slot {index}, which was never allocated")]
    InvalidHandle { index: u32 },

    #[error("Parameter pool has no slot left to hand out")]
    Exhausted,

    #[error(transparent)]
    Parameters(#[from] ParametersError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error(transparent)]
    Parameters(#[from] ParametersError),

    #[error("Failed to allocate {size} bytes of context extradata")]
    Allocation { size: usize },
}
