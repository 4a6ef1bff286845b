pub(crate) mod opts;
pub(crate) mod output;
pub(crate) mod queue;
pub(crate) mod sink;
pub(crate) mod state;
