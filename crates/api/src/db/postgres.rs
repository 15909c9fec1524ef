//! `PostgreSQL` user directory.
//!
//! Queries are built at runtime with `sqlx::query_as` because the variant
//! decides the table; row types are mapped through [`IdentityRow`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use loyalty_core::{
    Birthday, ChainId, CommentId, ContactInfo, Email, Phone, PromotionId, StoreId, TransactionId,
    UserId, UserVariant,
};

use super::{RepositoryError, UserDirectory};
use crate::models::{
    Cashier, Coordinates, Customer, CustomerUpdate, Executive, Identity, Manager, NearbyStore,
    NewIdentity, NewKind, StoredCredentials, UserProfile,
};

const PROFILE_COLUMNS: &str =
    "id, active, name, username, phone, email, password_hash, comments, created_at";

const FILTER_BY_ID: &str = "WHERE id = $1";
const FILTER_BY_HANDLE: &str =
    "WHERE username = $1 OR phone = $1 ORDER BY (username = $1) DESC LIMIT 1";
const ORDER_BY_CREATION: &str = "ORDER BY created_at, id";

/// A stored identity with its password hash.
type Stored = (Identity, String);

const fn table(variant: UserVariant) -> &'static str {
    match variant {
        UserVariant::Customer => "loyalty.customer",
        UserVariant::Manager => "loyalty.manager",
        UserVariant::Executive => "loyalty.executive",
        UserVariant::Cashier => "loyalty.cashier",
    }
}

/// Map a failed write, turning unique violations into conflicts.
fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let field = match db_err.constraint() {
            Some(c) if c.contains("phone") => "phone",
            Some(c) if c.contains("verify_token") => "verification token",
            _ => "username",
        };
        return RepositoryError::Conflict(format!("{field} already exists"));
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(FromRow)]
struct ProfileRow {
    id: UserId,
    active: bool,
    name: String,
    username: String,
    phone: Option<String>,
    email: Option<String>,
    password_hash: String,
    comments: Vec<CommentId>,
    created_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self) -> Result<(UserProfile, String), RepositoryError> {
        let email = self
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;
        let phone = self
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid phone in database: {e}")))?;
        let contact = ContactInfo::new(email, phone)
            .map_err(|e| RepositoryError::DataCorruption(format!("user {}: {e}", self.id)))?;

        let profile = UserProfile {
            id: self.id,
            active: self.active,
            name: self.name,
            username: self.username,
            contact,
            comments: self.comments,
            created_at: self.created_at,
        };
        Ok((profile, self.password_hash))
    }
}

/// A variant's row type.
trait IdentityRow: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    /// Columns selected after [`PROFILE_COLUMNS`], each with a leading comma.
    const EXTRA_COLUMNS: &'static str;

    fn into_stored(self) -> Result<Stored, RepositoryError>;
}

#[derive(FromRow)]
struct CustomerRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    address: String,
    address_lat: Option<f64>,
    address_lng: Option<f64>,
    birthday: NaiveDate,
    preferences: Vec<String>,
    transaction_history: Vec<TransactionId>,
    credits: i32,
    promotions: Vec<PromotionId>,
    nearest_stores: Json<BTreeMap<StoreId, NearbyStore>>,
    verify_token: Option<String>,
}

impl IdentityRow for CustomerRow {
    const EXTRA_COLUMNS: &'static str = ", address, address_lat, address_lng, birthday, preferences, \
         transaction_history, credits, promotions, nearest_stores, verify_token";

    fn into_stored(self) -> Result<Stored, RepositoryError> {
        let (profile, hash) = self.profile.into_profile()?;
        let credits = u32::try_from(self.credits).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative credits for customer {}", profile.id))
        })?;
        let address_coords = match (self.address_lat, self.address_lng) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };

        let customer = Customer {
            profile,
            address: self.address,
            address_coords,
            birthday: Birthday::from_stored(self.birthday),
            preferences: self.preferences,
            transaction_history: self.transaction_history,
            credits,
            promotions: self.promotions,
            nearest_stores: self.nearest_stores.0,
            verify_token: self.verify_token,
        };
        Ok((Identity::Customer(customer), hash))
    }
}

#[derive(FromRow)]
struct ManagerRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    added_accounts: Vec<UserId>,
    replied_comments: Vec<CommentId>,
}

impl IdentityRow for ManagerRow {
    const EXTRA_COLUMNS: &'static str = ", added_accounts, replied_comments";

    fn into_stored(self) -> Result<Stored, RepositoryError> {
        let (profile, hash) = self.profile.into_profile()?;
        let manager = Manager {
            profile,
            added_accounts: self.added_accounts,
            replied_comments: self.replied_comments,
        };
        Ok((Identity::Manager(manager), hash))
    }
}

#[derive(FromRow)]
struct ExecutiveRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    chain: Option<ChainId>,
}

impl IdentityRow for ExecutiveRow {
    const EXTRA_COLUMNS: &'static str = ", chain";

    fn into_stored(self) -> Result<Stored, RepositoryError> {
        let (profile, hash) = self.profile.into_profile()?;
        let executive = Executive {
            profile,
            chain: self.chain,
        };
        Ok((Identity::Executive(executive), hash))
    }
}

#[derive(FromRow)]
struct CashierRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
}

impl IdentityRow for CashierRow {
    const EXTRA_COLUMNS: &'static str = "";

    fn into_stored(self) -> Result<Stored, RepositoryError> {
        let (profile, hash) = self.profile.into_profile()?;
        Ok((Identity::Cashier(Cashier { profile }), hash))
    }
}

/// The single bind parameter of a select.
#[derive(Clone, Copy)]
enum Binding<'a> {
    None,
    Id(UserId),
    Handle(&'a str),
}

// =============================================================================
// Directory
// =============================================================================

/// A [`UserDirectory`] backed by one `PostgreSQL` table per variant.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_rows<R: IdentityRow>(
        &self,
        variant: UserVariant,
        filter: &str,
        binding: Binding<'_>,
    ) -> Result<Vec<Stored>, RepositoryError> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS}{} FROM {} {filter}",
            R::EXTRA_COLUMNS,
            table(variant)
        );
        let query = sqlx::query_as::<_, R>(&sql);
        let query = match binding {
            Binding::None => query,
            Binding::Id(id) => query.bind(id),
            Binding::Handle(handle) => query.bind(handle),
        };

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(R::into_stored)
            .collect()
    }

    async fn fetch(
        &self,
        variant: UserVariant,
        filter: &str,
        binding: Binding<'_>,
    ) -> Result<Vec<Stored>, RepositoryError> {
        match variant {
            UserVariant::Customer => self.fetch_rows::<CustomerRow>(variant, filter, binding).await,
            UserVariant::Manager => self.fetch_rows::<ManagerRow>(variant, filter, binding).await,
            UserVariant::Executive => {
                self.fetch_rows::<ExecutiveRow>(variant, filter, binding).await
            }
            UserVariant::Cashier => self.fetch_rows::<CashierRow>(variant, filter, binding).await,
        }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(
        &self,
        variant: UserVariant,
        id: UserId,
    ) -> Result<Option<Identity>, RepositoryError> {
        let rows = self.fetch(variant, FILTER_BY_ID, Binding::Id(id)).await?;
        Ok(rows.into_iter().next().map(|(identity, _)| identity))
    }

    async fn find_by_login_handle(
        &self,
        variant: UserVariant,
        handle: &str,
    ) -> Result<Option<StoredCredentials>, RepositoryError> {
        let rows = self
            .fetch(variant, FILTER_BY_HANDLE, Binding::Handle(handle))
            .await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|(identity, hash)| StoredCredentials {
                identity,
                password_hash: SecretString::from(hash),
            }))
    }

    async fn list(&self, variant: UserVariant) -> Result<Vec<Identity>, RepositoryError> {
        let rows = self.fetch(variant, ORDER_BY_CREATION, Binding::None).await?;
        Ok(rows.into_iter().map(|(identity, _)| identity).collect())
    }

    async fn insert(&self, new: NewIdentity) -> Result<Identity, RepositoryError> {
        let id = UserId::generate();
        let variant = new.variant();
        let NewIdentity { user, kind } = new;
        let (email, phone) = user.contact.into_parts();
        let email = email.as_ref().map(Email::as_str);
        let phone = phone.as_ref().map(Phone::as_str);

        let result = match kind {
            NewKind::Customer {
                address,
                birthday,
                verify_token,
            } => {
                sqlx::query(
                    r"
                    INSERT INTO loyalty.customer
                        (id, active, name, username, phone, email, password_hash,
                         address, birthday, verify_token)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    ",
                )
                .bind(id)
                .bind(variant.active_on_creation())
                .bind(&user.name)
                .bind(&user.username)
                .bind(phone)
                .bind(email)
                .bind(&user.password_hash)
                .bind(&address)
                .bind(birthday.date())
                .bind(&verify_token)
                .execute(&self.pool)
                .await
            }
            NewKind::Manager | NewKind::Executive | NewKind::Cashier => {
                let sql = format!(
                    "INSERT INTO {} (id, active, name, username, phone, email, password_hash) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    table(variant)
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(variant.active_on_creation())
                    .bind(&user.name)
                    .bind(&user.username)
                    .bind(phone)
                    .bind(email)
                    .bind(&user.password_hash)
                    .execute(&self.pool)
                    .await
            }
        };
        result.map_err(map_write_error)?;

        self.find_by_id(variant, id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn redeem_verify_token(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, UserId>(
            r"
            UPDATE loyalty.customer
            SET active = TRUE, verify_token = NULL
            WHERE verify_token = $1
            RETURNING id
            ",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_customer(
        &self,
        id: UserId,
        update: &CustomerUpdate,
    ) -> Result<bool, RepositoryError> {
        let email = update.email.as_ref().map(Email::as_str);
        let result = sqlx::query(
            r"
            UPDATE loyalty.customer SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                email = COALESCE($4, email),
                username = COALESCE($4, username),
                address = COALESCE($5, address),
                birthday = COALESCE($6, birthday),
                password_hash = COALESCE($7, password_hash),
                preferences = COALESCE($8, preferences)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.phone.as_ref().map(Phone::as_str))
        .bind(email)
        .bind(update.address.as_deref())
        .bind(update.birthday.map(|b| b.date()))
        .bind(update.password_hash.as_deref())
        .bind(update.preferences.as_deref())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, variant: UserVariant, id: UserId) -> Result<bool, RepositoryError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table(variant));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
