//! `SeaORM` Entity for the raw storefront interaction stream

use cartwatch_core::DBDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interaction_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: DBDateTime,
    pub store_id: i32,

    // Identity - any of these may be absent on a given record
    pub session_id: Option<String>,
    pub visitor_id: Option<String>,
    pub user_id: Option<String>,

    // Interaction
    pub action: String,
    pub page_path: Option<String>,

    // Commerce payload captured by the tracking snippet. The client sends
    // whatever it has; numeric values may arrive as strings.
    pub event_data: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
