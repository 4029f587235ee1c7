pub mod domain;
pub mod rest;
pub mod storage;
