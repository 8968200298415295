pub(crate) mod engine;
pub(crate) mod frame_loop;
pub(crate) mod physics;
pub(crate) mod pointer;
