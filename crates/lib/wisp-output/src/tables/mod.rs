pub mod rounds;
pub mod topology;
