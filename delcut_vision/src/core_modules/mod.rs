pub mod decision;
pub mod histogram;
pub mod pixel;
pub mod reference_pool;
pub mod signature;
pub mod similarity;
pub mod texture;
pub mod utils;
