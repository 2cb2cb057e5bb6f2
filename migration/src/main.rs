// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// replayrs 数据库迁移命令行
///
/// 连接串取自 `DATABASE_URL`，例如 `DATABASE_URL=sqlite://replayrs.db?mode=rwc cargo run -p migration -- up`
#[async_std::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
