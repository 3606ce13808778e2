pub mod client;


pub use client::HttpReportSubmitter;
