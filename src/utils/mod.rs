// Shared helpers: transcoding and binary reads

pub mod encoding;
pub mod io;
