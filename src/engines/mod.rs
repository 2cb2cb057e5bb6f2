// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 引擎模块
///
/// 远端回放目录的HTTP访问与目录列表解析
pub mod listing;
pub mod reqwest_engine;
pub mod traits;
