pub(crate) mod chain;
pub(crate) mod construction;

pub(crate) use chain::ResolutionChain;
pub(crate) use construction::Construction;
