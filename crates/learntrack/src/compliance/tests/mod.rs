mod achievements;
mod bulk;
mod common;
mod scoring;
