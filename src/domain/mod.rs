// Domain layer - SIRN data, charts and view models
pub mod chart;
pub mod city;
pub mod dataset;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod sirn;
pub mod view;
