pub mod accumulate;
pub mod calibrate;
pub mod decide;
pub mod evaluate;
pub mod metrics;
