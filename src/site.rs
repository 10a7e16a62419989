//! Per-site surface definition.
//!
//! Everything the pipeline knows about a target site lives here: login
//! URL, form selectors, block markers, and extraction selectors. The
//! rest of the pipeline is site-agnostic and reads this profile.

/// Selector and marker bundle for one target site.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Short identifier used as the session-store key.
    pub id: &'static str,
    /// URL of the login surface.
    pub login_url: &'static str,
    /// Name of the cookie that proves an authenticated session.
    pub session_cookie: &'static str,
    /// Selector for the login identifier field. Its presence is the
    /// login-form marker.
    pub username_selector: &'static str,
    /// Selector for the password field.
    pub password_selector: &'static str,
    /// Selector for the login submit button.
    pub submit_selector: &'static str,
    /// Element that only appears once logged in.
    pub landmark_selector: &'static str,
    /// Inline error shown for a wrong password.
    pub password_error_selector: &'static str,
    /// Inline error shown for a wrong identifier.
    pub username_error_selector: &'static str,
    /// Element that marks a verification challenge page.
    pub challenge_selector: &'static str,
    /// Title substring that marks a verification challenge page.
    pub challenge_title: &'static str,
    /// Element that marks a not-found/error page.
    pub error_page_selector: &'static str,
    /// Title substring that marks a not-found page.
    pub not_found_title: &'static str,
    /// Heading selectors tried in order for the profile name.
    pub heading_selectors: &'static [&'static str],
    /// Image selectors tried in order for the profile photo.
    pub photo_selectors: &'static [&'static str],
    /// JSON-LD `@type` of the entity to extract.
    pub entity_type: &'static str,
    /// Env var holding the account identifier.
    pub identifier_env: &'static str,
    /// Env var holding the account secret.
    pub secret_env: &'static str,
}

impl SiteProfile {
    /// The built-in LinkedIn profile surface.
    pub fn linkedin() -> Self {
        SiteProfile {
            id: "linkedin",
            login_url: "https://www.linkedin.com/login",
            session_cookie: "li_at",
            username_selector: "#username",
            password_selector: "#password",
            submit_selector: r#"button[type="submit"]"#,
            landmark_selector: ".global-nav__me",
            password_error_selector: "#error-for-password",
            username_error_selector: "#error-for-username",
            challenge_selector: ".challenge-form",
            challenge_title: "Verify",
            error_page_selector: ".error-page",
            not_found_title: "Page not found",
            heading_selectors: &["h1", ".text-heading-xlarge"],
            photo_selectors: &[
                "img.pv-top-card-profile-picture__image--show",
                "img.profile-photo",
                "img.profile-photo-edit__preview",
            ],
            entity_type: "Person",
            identifier_env: "LINKEDIN_EMAIL",
            secret_env: "LINKEDIN_PASSWORD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linkedin_profile_markers() {
        let site = SiteProfile::linkedin();
        assert_eq!(site.id, "linkedin");
        assert_eq!(site.session_cookie, "li_at");
        assert_eq!(site.heading_selectors[0], "h1");
        assert!(!site.photo_selectors.is_empty());
    }
}
