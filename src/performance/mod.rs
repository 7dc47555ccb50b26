pub(crate) mod performance_errors;
pub(crate) mod performance_model;
pub(crate) mod performance_repository;
pub(crate) mod performance_service;
pub(crate) mod performance_traits;
pub(crate) mod twr_calculator;

pub use performance_errors::PerformanceError;
pub use performance_model::{
    FillCalculateResult, NavRow, NavUpdate, NavUpsertResult, ReturnPoint, TwrDailyRow,
    TwrDailyRowDB, TwrRowsPage,
};
pub use performance_repository::PerformanceRepository;
pub use performance_service::PerformanceService;
pub use performance_traits::{PerformanceRepositoryTrait, PerformanceServiceTrait};
pub use twr_calculator::{compute_returns, TwrComputationStats};
