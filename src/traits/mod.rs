// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod processor;
pub mod transport;

pub use processor::Processor;
pub use transport::Transport;
