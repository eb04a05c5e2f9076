pub mod category;
pub mod notice;
pub mod observation;
pub mod series;
pub mod variable;

pub use category::Category;
pub use notice::Notice;
pub use observation::Observation;
pub use series::Series;
pub use variable::Variable;
