// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "matches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_run_id: Uuid,
    #[sea_orm(unique)]
    pub replay_url: String,
    pub map: Option<String>,
    pub game_version: String,
    pub starting_cash: Option<i32>,
    pub match_length_secs: Option<i64>,
    pub match_type: Option<String>,
    pub match_timestamp: Option<ChronoDateTimeWithTimeZone>,
    pub replay_size_kb: Option<i32>,
    pub replay_uploaded_by: Uuid,
    pub replay_upload_timestamp: Option<ChronoDateTimeWithTimeZone>,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job_run::Entity",
        from = "Column::JobRunId",
        to = "super::job_run::Column::Id",
        on_delete = "Cascade"
    )]
    JobRun,
    #[sea_orm(
        belongs_to = "super::player::Entity",
        from = "Column::ReplayUploadedBy",
        to = "super::player::Column::Id",
        on_delete = "Cascade"
    )]
    Uploader,
    #[sea_orm(has_many = "super::match_player::Entity")]
    MatchPlayer,
}

impl Related<super::job_run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobRun.def()
    }
}

impl Related<super::match_player::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MatchPlayer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
