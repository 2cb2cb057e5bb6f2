// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 远端回放目录的访问与目录页解析
pub mod engines;

/// 基础设施模块
///
/// 提供数据库、仓库实现与指标导出
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的错误类型和遥测初始化
pub mod utils;

/// 工作器模块
///
/// 有界工作池与单元完成追踪
pub mod workers;
