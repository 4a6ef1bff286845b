pub(crate) mod blend;
pub(crate) mod engine;
pub(crate) mod line;
pub(crate) mod stage;
pub(crate) mod writeback;
