//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub body: String,
    #[sea_orm(indexed)]
    pub timestamp: DateTimeWithTimeZone,
    #[sea_orm(indexed)]
    pub user_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for microblog_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            body: model.body,
            timestamp: model.timestamp.into(),
            author_id: model.user_id,
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<microblog_core::domain::Post> for ActiveModel {
    fn from(post: microblog_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            body: Set(post.body),
            timestamp: Set(post.timestamp.into()),
            user_id: Set(post.author_id),
        }
    }
}
