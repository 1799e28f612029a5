// SPDX-License-Identifier: GPL-3.0-only

//! Host backends

pub mod camera;
