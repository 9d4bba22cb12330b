use mongodb::{
    bson::doc,
    options::IndexOptions,
    Database, IndexModel,
};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // users: unique username
    {
        let col = db.collection::<mongodb::bson::Document>("users");
        let model = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None).await?;
    }

    // transactions: holdings lookups per (user_id, symbol)
    {
        let col = db.collection::<mongodb::bson::Document>("transactions");
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "symbol": 1 })
            .build();

        col.create_index(model, None).await?;
    }

    // transactions: history sorted by created_at desc
    {
        let col = db.collection::<mongodb::bson::Document>("transactions");
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .build();

        col.create_index(model, None).await?;
    }

    Ok(())
}
