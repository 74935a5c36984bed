//! Desired table definitions for the current schema version.
//!
//! Order matters: parents are listed before the tables that reference them,
//! and repair walks the tables in this order.

use cz_core::{
    ColumnDef, CoreResult, DefaultValue, FkAction, ForeignKeyDef, IndexDef, TableSchema,
};

fn cascade(columns: &[&str], parent: &str) -> ForeignKeyDef {
    ForeignKeyDef::new(columns, parent, &["id"])
        .on_update(FkAction::Cascade)
        .on_delete(FkAction::Cascade)
}

pub fn song() -> CoreResult<TableSchema> {
    TableSchema::builder("song")
        .column(ColumnDef::text("id").not_null())
        .column(ColumnDef::text("title").not_null())
        // Unknown duration reads as -1 in the player.
        .column(
            ColumnDef::integer("duration")
                .not_null()
                .fallback(DefaultValue::Integer(-1)),
        )
        .column(ColumnDef::text("thumbnailUrl"))
        .column(ColumnDef::text("albumId"))
        .column(ColumnDef::text("albumName"))
        .column(ColumnDef::integer("liked").not_null().default_int(0))
        .column(ColumnDef::integer("totalPlayTime").not_null().default_int(0))
        .column(ColumnDef::integer("inLibrary"))
        .column(ColumnDef::integer("explicit").not_null().default_int(0))
        .column(ColumnDef::integer("isLocal").not_null().default_int(0))
        .primary_key(&["id"])
        .build()
}

pub fn artist() -> CoreResult<TableSchema> {
    TableSchema::builder("artist")
        .column(ColumnDef::text("id").not_null())
        .column(ColumnDef::text("name").not_null())
        .column(ColumnDef::text("thumbnailUrl"))
        .column(ColumnDef::integer("lastUpdateTime").not_null())
        .column(ColumnDef::integer("bookmarkedAt"))
        .primary_key(&["id"])
        .build()
}

pub fn album() -> CoreResult<TableSchema> {
    TableSchema::builder("album")
        .column(ColumnDef::text("id").not_null())
        .column(ColumnDef::text("title").not_null())
        .column(ColumnDef::integer("year"))
        .column(ColumnDef::text("thumbnailUrl"))
        .column(ColumnDef::integer("songCount").not_null())
        .column(ColumnDef::integer("duration").not_null())
        .column(ColumnDef::integer("lastUpdateTime").not_null())
        .column(ColumnDef::integer("bookmarkedAt"))
        .primary_key(&["id"])
        .build()
}

pub fn playlist() -> CoreResult<TableSchema> {
    TableSchema::builder("playlist")
        .column(ColumnDef::text("id").not_null())
        .column(ColumnDef::text("name").not_null())
        .column(ColumnDef::text("browseId"))
        .column(ColumnDef::integer("createdAt"))
        .column(ColumnDef::integer("lastUpdateTime"))
        .column(ColumnDef::integer("isEditable").not_null().default_int(1))
        .column(ColumnDef::integer("bookmarkedAt"))
        .primary_key(&["id"])
        .build()
}

pub fn song_artist_map() -> CoreResult<TableSchema> {
    TableSchema::builder("song_artist_map")
        .column(ColumnDef::text("songId").not_null())
        .column(ColumnDef::text("artistId").not_null())
        .column(ColumnDef::integer("position").not_null())
        .primary_key(&["songId", "artistId"])
        .foreign_key(cascade(&["songId"], "song"))
        .foreign_key(cascade(&["artistId"], "artist"))
        .index(IndexDef::on(&["songId"]))
        .index(IndexDef::on(&["artistId"]))
        .build()
}

pub fn playlist_song_map() -> CoreResult<TableSchema> {
    TableSchema::builder("playlist_song_map")
        .column(ColumnDef::integer("id").not_null())
        .column(ColumnDef::text("playlistId").not_null())
        .column(ColumnDef::text("songId").not_null())
        .column(ColumnDef::integer("position").not_null())
        .primary_key(&["id"])
        .foreign_key(cascade(&["playlistId"], "playlist"))
        .foreign_key(cascade(&["songId"], "song"))
        .index(IndexDef::on(&["playlistId"]))
        .index(IndexDef::on(&["songId"]))
        .build()
}

pub fn event() -> CoreResult<TableSchema> {
    TableSchema::builder("event")
        .column(ColumnDef::integer("id").not_null())
        .column(ColumnDef::text("songId").not_null())
        .column(ColumnDef::integer("timestamp").not_null())
        .column(ColumnDef::integer("playTime").not_null())
        .primary_key(&["id"])
        .foreign_key(cascade(&["songId"], "song"))
        .index(IndexDef::on(&["songId"]))
        .build()
}

pub fn format() -> CoreResult<TableSchema> {
    TableSchema::builder("format")
        .column(ColumnDef::text("id").not_null())
        .column(ColumnDef::integer("itag").not_null())
        .column(ColumnDef::text("mimeType").not_null())
        .column(ColumnDef::text("codecs").not_null())
        .column(ColumnDef::integer("bitrate").not_null())
        .column(ColumnDef::integer("sampleRate"))
        .column(ColumnDef::integer("contentLength").not_null())
        .column(ColumnDef::real("loudnessDb"))
        .primary_key(&["id"])
        .build()
}

pub fn lyrics() -> CoreResult<TableSchema> {
    TableSchema::builder("lyrics")
        .column(ColumnDef::text("id").not_null())
        .column(ColumnDef::text("lyrics").not_null())
        .primary_key(&["id"])
        .build()
}

pub fn search_history() -> CoreResult<TableSchema> {
    TableSchema::builder("search_history")
        .column(ColumnDef::integer("id").not_null())
        .column(ColumnDef::text("query").not_null())
        .primary_key(&["id"])
        .index(IndexDef::on(&["query"]).unique())
        .build()
}

/// Every table, parents first.
pub fn all() -> CoreResult<Vec<TableSchema>> {
    Ok(vec![
        song()?,
        artist()?,
        album()?,
        playlist()?,
        song_artist_map()?,
        playlist_song_map()?,
        event()?,
        format()?,
        lyrics()?,
        search_history()?,
    ])
}
