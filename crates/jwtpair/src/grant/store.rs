//! Resource owner credentials

use constant_time_eq::constant_time_eq;

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub role: String,
}

/// Checks resource owner credentials
pub trait CredentialStore: Send + Sync {
    /// The user `username` if `password` is theirs
    fn lookup(&self, username: &str, password: &str) -> Option<UserRecord>;
}

#[derive(Debug, Clone)]
struct StoredUser {
    record: UserRecord,
    password: String,
}

/// Fixed in-memory user table
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    users: Vec<StoredUser>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the demo users alice, bob (players) and charlie (admin)
    pub fn demo() -> Self {
        let mut store = Self::new();
        store.insert(
            "49cbf85b-6354-447c-b23d-d01f521696a3",
            "alice",
            "strongP@s$w0rd",
            "player",
        );
        store.insert(
            "076ce020-23c9-4795-8243-632191b6f9e0",
            "bob",
            "otherstrongP@s$w0rd",
            "player",
        );
        store.insert(
            "0083932a-07bd-42c8-a0ec-5579435f3627",
            "charlie",
            "root",
            "admin",
        );
        store
    }

    /// Add a user, replacing any user with the same name
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        role: impl Into<String>,
    ) -> &mut Self {
        let record = UserRecord {
            id: id.into(),
            username: username.into(),
            role: role.into(),
        };
        self.users.retain(|user| user.record.username != record.username);
        self.users.push(StoredUser {
            record,
            password: password.into(),
        });
        self
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn lookup(&self, username: &str, password: &str) -> Option<UserRecord> {
        let user = self
            .users
            .iter()
            .find(|user| user.record.username == username)?;
        constant_time_eq(user.password.as_bytes(), password.as_bytes()).then(|| user.record.clone())
    }
}
