pub mod remote_path;
pub mod status;
