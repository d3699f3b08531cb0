#![cfg_attr(not(test), no_std)]

pub mod bus;
pub mod commands;
pub mod config;
pub mod console;
pub mod context;
pub mod ddr;
pub mod error;
pub mod ethernet;
pub mod hal;
pub mod irq;
pub mod logger;
pub mod net;
#[cfg(target_arch = "riscv32")]
mod panic;
pub mod parse;
pub mod progress;
pub mod soc;
pub mod stream;
pub mod timing;
