pub mod backtest;
pub mod config;
pub mod corpus;
pub mod explorer;
pub mod favorite;
pub mod handicap;
pub mod outcome;
pub mod pattern_search;
pub mod resolver;
