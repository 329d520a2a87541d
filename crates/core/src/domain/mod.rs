pub mod element;
pub mod item;
pub mod rule;
