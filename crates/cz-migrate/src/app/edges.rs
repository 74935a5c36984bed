//! Version edges of the library schema.
//!
//! | Edge      | Change |
//! |-----------|--------|
//! | 1 -> 2    | `format` and `lyrics` tables |
//! | 2 -> 3    | `event` table, playlist timestamps, artist bookmarks |
//! | 3 -> 4    | library membership, album and playlist bookmarks, editable playlists |
//! | 4 -> 5    | repair of `song` (explicit/local flags, defaults) and `playlist` |
//! | 3 -> 5    | skip edge combining the two above |
//! | * -> 5    | create and repair everything |

use crate::context::MigrationContext;
use crate::error::MigrateResult;
use crate::registry::{MigrationEdge, MigrationRegistry};

pub fn registry() -> MigrateResult<MigrationRegistry> {
    MigrationRegistry::new()
        .with(MigrationEdge::new(1, 2, "add format and lyrics tables", v1_to_v2))?
        .with(MigrationEdge::new(
            2,
            3,
            "add play events, playlist timestamps and artist bookmarks",
            v2_to_v3,
        ))?
        .with(
            MigrationEdge::new(
                3,
                4,
                "add library membership, bookmarks and editable playlists",
                v3_to_v4,
            )
            .with_post_migrate(backfill_in_library),
        )?
        .with(MigrationEdge::new(4, 5, "repair song and playlist", v4_to_v5))?
        .with(
            MigrationEdge::new(3, 5, "repair song, album and playlist", v3_to_v5)
                .with_post_migrate(backfill_in_library),
        )?
        .with(MigrationEdge::catch_all(
            5,
            "create missing tables and repair everything",
            repair_everything,
        ))
}

fn v1_to_v2(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.create_table("format")?;
    ctx.create_table("lyrics")
}

fn v2_to_v3(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.create_table("event")?;
    ctx.ensure_column("playlist", "createdAt")?;
    ctx.ensure_column("playlist", "lastUpdateTime")?;
    ctx.ensure_column("artist", "bookmarkedAt")?;
    Ok(())
}

fn v3_to_v4(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.ensure_column("song", "inLibrary")?;
    ctx.ensure_column("album", "bookmarkedAt")?;
    ctx.ensure_column("playlist", "isEditable")?;
    ctx.ensure_column("playlist", "bookmarkedAt")?;
    Ok(())
}

/// Liked songs predate the library flag; count them as added when the
/// migration ran.
fn backfill_in_library(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    let stamped = ctx.execute(&format!(
        "UPDATE song SET inLibrary = {} WHERE liked = 1 AND inLibrary IS NULL",
        ctx.started_at().timestamp_millis()
    ))?;
    if stamped > 0 {
        ctx.log()
            .info(&format!("Added {stamped} liked songs to the library"));
    }
    Ok(())
}

fn v4_to_v5(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.repair(&["song", "playlist"])?;
    Ok(())
}

fn v3_to_v5(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.repair(&["song", "album", "playlist"])?;
    Ok(())
}

fn repair_everything(ctx: &MigrationContext<'_>) -> MigrateResult<()> {
    ctx.create_missing_tables()?;
    ctx.repair_all()?;
    ctx.ensure_all_indexes()
}
