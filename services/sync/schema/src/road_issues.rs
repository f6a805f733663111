use sea_orm::entity::prelude::*;

/// Geotagged road defect report.
///
/// `status` and `niveau_danger` hold canonical codes (`EN_COURS`, `MOYEN`, ...).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "road_issues")]
pub struct Model {
    /// Local UUIDv7 text or the cloud document id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub niveau_danger: String,
    pub status: String,
    pub surface: f64,
    pub budget: f64,
    pub user_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Set once, on the first transition into `EN_COURS`.
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Set once, on the first transition into `RESOLU`.
    pub resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
