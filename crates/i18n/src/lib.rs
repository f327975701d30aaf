mod i18n_catalog;
mod interpolate;
mod locale;
mod localizer;

pub use i18n_catalog::{BundleSource, CompletenessReport, LocaleTable, PlaceholderMismatch};
pub use interpolate::{interpolate, placeholders};
pub use locale::{
    DEFAULT_LOCALE, SYSTEM_LOCALE_PREFERENCE, LocaleState, normalize_locale_preference,
    resolve_locale, resolve_system_locale,
};
pub use localizer::Localizer;
pub use protocol::{AppError, AppResult, ResultExt};
