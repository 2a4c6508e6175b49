#![allow(dead_code)]

pub mod page;
pub mod widgets;
