//! Scoped connection-pragma changes.
//!
//! A guard sets a flag on creation and puts it back when dropped, so the
//! flag is restored on every exit path including `?` and panics.

use cz_db::pragmas::{self, ConnectionFlag};
use cz_db::{Database, DbResult};

/// Holds one connection flag at a temporary value.
pub struct PragmaGuard<'a> {
    db: &'a dyn Database,
    flag: ConnectionFlag,
    restore_to: bool,
    active: bool,
}

impl<'a> PragmaGuard<'a> {
    /// Set `flag` to `value`, restoring its current value on drop.
    pub fn set(db: &'a dyn Database, flag: ConnectionFlag, value: bool) -> DbResult<Self> {
        let previous = pragmas::flag(db, flag)?;
        Self::set_then(db, flag, value, previous)
    }

    /// Set `flag` to `value`, leaving it at `restore_to` on drop.
    pub fn set_then(
        db: &'a dyn Database,
        flag: ConnectionFlag,
        value: bool,
        restore_to: bool,
    ) -> DbResult<Self> {
        pragmas::set_flag(db, flag, value)?;
        Ok(Self {
            db,
            flag,
            restore_to,
            active: true,
        })
    }

    pub fn flag(&self) -> ConnectionFlag {
        self.flag
    }

    /// Restore now, reporting failure instead of logging it.
    pub fn restore(mut self) -> DbResult<()> {
        self.active = false;
        pragmas::set_flag(self.db, self.flag, self.restore_to)
    }
}

impl Drop for PragmaGuard<'_> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = pragmas::set_flag(self.db, self.flag, self.restore_to) {
            log::error!(
                "Failed to restore PRAGMA {} = {}: {e}",
                self.flag.pragma_name(),
                self.restore_to
            );
        }
    }
}

/// Suspends foreign-key enforcement for a repair.
///
/// Outside a transaction this turns `foreign_keys` off and turns it back on
/// when dropped. Inside a transaction `foreign_keys` cannot change, so the
/// guard defers checking to commit time with `defer_foreign_keys` instead.
///
/// Deferral only covers row checks. A table rebuild still needs
/// `foreign_keys` off, so a deferred pass can patch columns but any rebuild
/// it attempts fails with [`RebuildPhase::Prepare`](crate::RebuildPhase).
/// Take the guard before opening the transaction when rebuilds are possible.
pub enum ForeignKeyGuard<'a> {
    Disabled(PragmaGuard<'a>),
    Deferred(PragmaGuard<'a>),
}

impl<'a> ForeignKeyGuard<'a> {
    pub fn suspend(db: &'a dyn Database) -> DbResult<Self> {
        if db.in_transaction() {
            let guard = PragmaGuard::set(db, ConnectionFlag::DeferForeignKeys, true)?;
            log::debug!("Foreign keys deferred until commit");
            Ok(ForeignKeyGuard::Deferred(guard))
        } else {
            let guard = PragmaGuard::set_then(db, ConnectionFlag::ForeignKeys, false, true)?;
            log::debug!("Foreign keys disabled");
            Ok(ForeignKeyGuard::Disabled(guard))
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, ForeignKeyGuard::Deferred(_))
    }

    /// Restore now, reporting failure instead of logging it.
    pub fn restore(self) -> DbResult<()> {
        match self {
            ForeignKeyGuard::Disabled(guard) | ForeignKeyGuard::Deferred(guard) => guard.restore(),
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
