//! SQLite memoization of risk profiles and correlations.

use crate::asset::EstimationMethod;
use crate::error::{DataError, Result};
use crate::records::{
    CorrelationKey, CorrelationResult, ProfileField, ProfileKey, ProfileRecord, ProfileUpdate,
    RiskProfile,
};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};
use tracing::{debug, warn};

type SharedConnection = Arc<Mutex<Connection>>;

/// Connections opened by this process, keyed by canonical database path.
fn open_connections() -> &'static Mutex<HashMap<PathBuf, Weak<Mutex<Connection>>>> {
    static CONNECTIONS: OnceLock<Mutex<HashMap<PathBuf, Weak<Mutex<Connection>>>>> =
        OnceLock::new();
    CONNECTIONS.get_or_init(Default::default)
}

/// Resolve a database path to the key it is registered under.
///
/// Existing files are canonicalized, which resolves `..` components and
/// symlinks. A file not yet created is keyed by its canonical parent
/// directory joined with its name.
fn registry_key(path: &Path) -> Result<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Ok(resolved);
    }

    let absolute = std::path::absolute(path)?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => Ok(parent.canonicalize()?.join(name)),
        _ => Ok(absolute),
    }
}

/// Persistent cache of computed results.
///
/// Reads never fail: a missing row, a null requested column or a storage
/// error are all reported as a miss. Writes are column-scoped upserts, so
/// independent call sites can fill different columns of one profile row.
///
/// Handles are cheap to clone. Every handle opened on the same path within a
/// process shares one connection.
#[derive(Debug, Clone)]
pub struct ResultCache {
    conn: SharedConnection,
}

impl ResultCache {
    /// Open (or create) a cache database.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = registry_key(path.as_ref())?;
        let mut registry = open_connections()
            .lock()
            .map_err(|_| DataError::Cache("Connection registry poisoned".to_string()))?;

        if let Some(conn) = registry.get(&path).and_then(Weak::upgrade) {
            debug!(path = %path.display(), "reusing open cache connection");
            return Ok(Self { conn });
        }

        let cache = Self {
            conn: Arc::new(Mutex::new(Connection::open(&path)?)),
        };
        cache.initialize_schema()?;
        registry.retain(|_, conn| conn.strong_count() > 0);
        registry.insert(path, Arc::downgrade(&cache.conn));
        Ok(cache)
    }

    /// Create a private in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let cache = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Whether two handles share the same underlying connection.
    pub fn shares_connection_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DataError::Cache("Cache connection poisoned".to_string()))
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS profiles (
                ticker TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                method TEXT NOT NULL,
                annual_return REAL,
                annual_volatility REAL,
                sharpe_ratio REAL,
                asset_beta REAL,
                equity_cost REAL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (ticker, start_date, end_date, method)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS correlations (
                ticker_1 TEXT NOT NULL,
                ticker_2 TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                method TEXT NOT NULL,
                correlation REAL NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (ticker_1, ticker_2, start_date, end_date, method)
            )",
            [],
        )?;

        Ok(())
    }

    /// Get the stored profile row for a key, whatever its null columns.
    pub fn get_profile(&self, key: &ProfileKey) -> Result<Option<ProfileRecord>> {
        let conn = self.connection()?;
        let record = conn
            .query_row(
                "SELECT annual_return, annual_volatility, sharpe_ratio, asset_beta, equity_cost
                 FROM profiles
                 WHERE ticker = ?1 AND start_date = ?2 AND end_date = ?3 AND method = ?4",
                params![
                    key.ticker,
                    key.start_date.to_string(),
                    key.end_date.to_string(),
                    key.method.to_db_str()
                ],
                |row| {
                    Ok(ProfileRecord {
                        annual_return: row.get(0)?,
                        annual_volatility: row.get(1)?,
                        sharpe_ratio: row.get(2)?,
                        asset_beta: row.get(3)?,
                        equity_cost: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    /// Look up a profile row whose requested fields are all populated.
    pub fn filter_profile(
        &self,
        key: &ProfileKey,
        fields: &[ProfileField],
    ) -> Option<ProfileRecord> {
        match self.get_profile(key) {
            Ok(Some(record)) if fields.iter().all(|&f| record.get(f).is_some()) => Some(record),
            Ok(_) => None,
            Err(e) => {
                warn!(ticker = %key.ticker, error = %e, "profile cache read failed");
                None
            }
        }
    }

    /// Look up a complete risk profile.
    pub fn filter_risk_profile(&self, key: &ProfileKey) -> Option<RiskProfile> {
        let record = self.filter_profile(key, &ProfileField::RISK_RETURN)?;
        Some(RiskProfile::from_key(
            key,
            record.annual_return?,
            record.annual_volatility?,
        ))
    }

    /// Insert a profile row or fill in columns of an existing one.
    ///
    /// Columns left as `None` in `update` keep their stored value.
    pub fn save_or_update_profile(&self, key: &ProfileKey, update: &ProfileUpdate) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        let conn = self.connection()?;

        conn.execute(
            "INSERT INTO profiles (
                ticker, start_date, end_date, method,
                annual_return, annual_volatility, sharpe_ratio, asset_beta, equity_cost,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (ticker, start_date, end_date, method) DO UPDATE SET
                annual_return = COALESCE(excluded.annual_return, profiles.annual_return),
                annual_volatility =
                    COALESCE(excluded.annual_volatility, profiles.annual_volatility),
                sharpe_ratio = COALESCE(excluded.sharpe_ratio, profiles.sharpe_ratio),
                asset_beta = COALESCE(excluded.asset_beta, profiles.asset_beta),
                equity_cost = COALESCE(excluded.equity_cost, profiles.equity_cost),
                updated_at = excluded.updated_at",
            params![
                key.ticker,
                key.start_date.to_string(),
                key.end_date.to_string(),
                key.method.to_db_str(),
                update.annual_return,
                update.annual_volatility,
                update.sharpe_ratio,
                update.asset_beta,
                update.equity_cost,
                updated_at,
            ],
        )?;

        Ok(())
    }

    /// Store a risk profile's return and volatility.
    pub fn save_risk_profile(&self, profile: &RiskProfile) -> Result<()> {
        let key = ProfileKey::new(
            &profile.ticker,
            profile.start_date,
            profile.end_date,
            profile.method,
        );
        self.save_or_update_profile(
            &key,
            &ProfileUpdate::risk_return(profile.annual_return, profile.annual_volatility),
        )
    }

    fn get_correlation(&self, key: &CorrelationKey) -> Result<Option<f64>> {
        let conn = self.connection()?;
        let correlation = conn
            .query_row(
                "SELECT correlation FROM correlations
                 WHERE ticker_1 = ?1 AND ticker_2 = ?2
                   AND start_date = ?3 AND end_date = ?4 AND method = ?5",
                params![
                    key.ticker_1,
                    key.ticker_2,
                    key.start_date.to_string(),
                    key.end_date.to_string(),
                    key.method.to_db_str()
                ],
                |row| row.get(0),
            )
            .optional()?;

        Ok(correlation)
    }

    /// Look up a correlation under either ticker ordering.
    ///
    /// The result is reported in the ordering of `key`.
    pub fn filter_correlation(&self, key: &CorrelationKey) -> Option<CorrelationResult> {
        let lookup = self.get_correlation(key).and_then(|found| match found {
            Some(value) => Ok(Some(value)),
            None => self.get_correlation(&key.reversed()),
        });

        match lookup {
            Ok(found) => found.map(|value| CorrelationResult::from_key(key, value)),
            Err(e) => {
                warn!(
                    ticker_1 = %key.ticker_1,
                    ticker_2 = %key.ticker_2,
                    error = %e,
                    "correlation cache read failed"
                );
                None
            }
        }
    }

    /// Store a correlation under both ticker orderings.
    pub fn save_correlation(&self, result: &CorrelationResult) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        for (first, second) in [
            (&result.ticker_1, &result.ticker_2),
            (&result.ticker_2, &result.ticker_1),
        ] {
            tx.execute(
                "INSERT INTO correlations
                 (ticker_1, ticker_2, start_date, end_date, method, correlation, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (ticker_1, ticker_2, start_date, end_date, method) DO UPDATE SET
                    correlation = excluded.correlation,
                    updated_at = excluded.updated_at",
                params![
                    first,
                    second,
                    result.start_date.to_string(),
                    result.end_date.to_string(),
                    result.method.to_db_str(),
                    result.correlation,
                    updated_at,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Number of cached profiles for a method.
    pub fn profile_count(&self, method: EstimationMethod) -> Result<usize> {
        let count: i64 = self.connection()?.query_row(
            "SELECT COUNT(*) FROM profiles WHERE method = ?1",
            params![method.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Clear all cached results.
    pub fn clear_all(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM profiles", [])?;
        conn.execute("DELETE FROM correlations", [])?;
        Ok(())
    }

    /// Clear cached results involving a ticker.
    pub fn clear_ticker(&self, ticker: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM profiles WHERE ticker = ?1", params![ticker])?;
        conn.execute(
            "DELETE FROM correlations WHERE ticker_1 = ?1 OR ticker_2 = ?1",
            params![ticker],
        )?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let conn = self.connection()?;

        let profiles: i64 =
            conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;

        let tickers: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT ticker) FROM profiles",
            [],
            |row| row.get(0),
        )?;

        let correlation_rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM correlations", [], |row| row.get(0))?;

        let mut stmt =
            conn.prepare("SELECT method, COUNT(*) FROM profiles GROUP BY method ORDER BY method")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut profiles_by_method = Vec::new();
        for row in rows {
            let (method, count) = row?;
            profiles_by_method.push((EstimationMethod::from_db_str(&method)?, count as usize));
        }

        Ok(CacheStats {
            profiles: profiles as usize,
            unique_tickers: tickers as usize,
            correlation_rows: correlation_rows as usize,
            profiles_by_method,
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of profile rows
    pub profiles: usize,
    /// Number of distinct tickers with a profile row
    pub unique_tickers: usize,
    /// Number of correlation rows (each pair is stored twice)
    pub correlation_rows: usize,
    /// Profile rows per estimation method, for methods with at least one row
    pub profiles_by_method: Vec<(EstimationMethod, usize)>,
}
