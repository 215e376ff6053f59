pub mod inspect;
pub mod nminus1;
pub mod opf;
pub mod report;
pub mod run;
pub mod scenarios;
pub mod stress;
pub mod ts;
