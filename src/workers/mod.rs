// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供有界工作池：并发控制、单元错误隔离以及嵌套单元的完成追踪
pub mod pool;

pub use pool::{await_all, UnitHandle, WorkerPool};
