// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod envelope;
mod mesh;

pub use envelope::{Envelope, ENVELOPE_LEN};
pub use mesh::MeshTransport;
