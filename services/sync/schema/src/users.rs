use sea_orm::entity::prelude::*;

/// Local copy of a platform account, keyed by the identity provider's uid.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub role_id: i16,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::road_issues::Entity")]
    RoadIssues,
    #[sea_orm(has_one = "super::block_user::Entity")]
    Block,
}

impl Related<super::road_issues::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoadIssues.def()
    }
}

impl Related<super::block_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Block.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
