//! Typed builder for new accounts.

use validator::Validate;

/// Account about to be registered.
///
/// `password` is still in plain text: [`super::UserService`] hashes it right
/// before insertion.
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(custom(
        function = "super::validate_email",
        message = "Invalid email format."
    ))]
    pub email: String,
    #[validate(length(
        min = 6,
        message = "Password must be at least 6 characters long."
    ))]
    pub password: String,
    pub name: String,
    pub profile_picture: String,
}

/// [`NewUser`] builder.
#[derive(Debug, Clone)]
pub struct UserBuilder<Email, Password> {
    email: Email,
    password: Password,
    name: String,
    profile_picture: Option<String>,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            email: Missing,
            password: Missing,
            name: String::default(),
            profile_picture: None,
        }
    }
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Password> UserBuilder<Missing, Password> {
    /// Update `email` field on [`UserBuilder`].
    pub fn email(
        self,
        email: impl Into<String>,
    ) -> UserBuilder<Present<String>, Password> {
        UserBuilder {
            email: Present(email.into()),
            password: self.password,
            name: self.name,
            profile_picture: self.profile_picture,
        }
    }
}

impl<Email> UserBuilder<Email, Missing> {
    /// Update `password` field on [`UserBuilder`].
    pub fn password(
        self,
        password: impl Into<String>,
    ) -> UserBuilder<Email, Present<String>> {
        UserBuilder {
            email: self.email,
            password: Present(password.into()),
            name: self.name,
            profile_picture: self.profile_picture,
        }
    }
}

impl<Email, Password> UserBuilder<Email, Password> {
    /// Update `name` field on [`UserBuilder`].
    pub fn name(mut self, name: impl ToString) -> Self {
        self.name = name.to_string();
        self
    }

    /// Update `profile_picture` field on [`UserBuilder`].
    ///
    /// A random avatar is assigned when none is given.
    pub fn profile_picture(mut self, url: Option<String>) -> Self {
        self.profile_picture = url;
        self
    }
}

impl UserBuilder<Present<String>, Present<String>> {
    /// Build a [`NewUser`] with `email` and `password`.
    pub fn build(self) -> NewUser {
        NewUser {
            email: self.email.0,
            password: self.password.0,
            name: self.name,
            profile_picture: self
                .profile_picture
                .unwrap_or_else(super::random_avatar),
        }
    }
}
