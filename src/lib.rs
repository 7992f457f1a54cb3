// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compliancebot - Component Compliance Validation Engine
//!
//! Part of the gitbot-fleet ecosystem. Compliancebot scores a rendered UI
//! component against brand theme consistency, accessibility rules and
//! performance budgets, and folds the results into a pass/fail verdict.
//!
//! ## Validators
//!
//! - **Theme** (1.4.3/2.4.7): class, custom property, palette, typography,
//!   brand asset, state, breakpoint and contrast checks per brand
//! - **Accessibility** (1.1.1/1.3.1/2.1.1/2.5.5/4.1.2): form, navigation,
//!   interactive control and media rule modules
//! - **Performance**: Core Web Vitals, render time, bundle budgets,
//!   accessibility latency, locale latency, memory and network
//! - **Orchestrator**: one validator across every brand, with cancellation
//!   and a wall-clock budget
//!
//! ## Example
//!
//! ```no_run
//! use compliancebot::catalog::Catalog;
//! use compliancebot::dom::Document;
//! use compliancebot::theme::{MunicipalityThemeTester, ThemeOptions};
//!
//! let document = Document::parse("<div class=\"municipality-thalwil\">Hallo</div>");
//! let element = document.component("").unwrap();
//! let tester = MunicipalityThemeTester::new(Catalog::global(), "thalwil").unwrap();
//! let report = tester.run_complete_theme_tests(&element, &ThemeOptions::default());
//! println!("{:.1}%", report.summary.pass_rate);
//! ```

pub mod analyzers;
pub mod catalog;
pub mod config;
pub mod dom;
pub mod error;
pub mod orchestrator;
pub mod performance;
pub mod report;
pub mod scanner;
pub mod style;
pub mod theme;
pub mod validation;

pub use error::{EngineError, Result};
