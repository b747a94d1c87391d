pub mod caretaker;
pub mod family;
pub mod settings;

pub use caretaker::{Caretaker, Role};
pub use family::Family;
pub use settings::FamilySettings;
