pub mod series;
pub mod outcome;
pub mod request;
