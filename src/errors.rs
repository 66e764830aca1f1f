// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Common error types and macros.

use std::io;
use std::result;

use quick_error::quick_error;

quick_error! {
  #[derive(Debug)]
  pub enum ParquetError {
    /// A requested column index is not in the schema, or the request
    /// arguments are inconsistent with each other.
    InvalidArgument(message: String) {
      display("Invalid argument: {}", message)
    }
    /// A logical type or schema shape this reader does not support.
    NotImplemented(message: String) {
      display("Not yet implemented: {}", message)
    }
    /// The physical reader failed; converted at the facade boundary.
    Io(message: String, err: io::Error) {
      display("IO error: {}, {}", message, err)
      from(err: io::Error) -> ("underlying IO error".to_owned(), err)
      source(err)
    }
    /// Structural inconsistency detected during assembly.
    Invalid(message: String) {
      display("Invalid data: {}", message)
    }
  }
}

pub type Result<T> = result::Result<T, ParquetError>;

/// Convenient macros for the different error kinds.

macro_rules! arg_err {
  ($fmt:expr) => (crate::errors::ParquetError::InvalidArgument($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) =>
    (crate::errors::ParquetError::InvalidArgument(format!($fmt, $($args),*)));
}

macro_rules! nyi_err {
  ($fmt:expr) => (crate::errors::ParquetError::NotImplemented($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) =>
    (crate::errors::ParquetError::NotImplemented(format!($fmt, $($args),*)));
}

macro_rules! invalid_err {
  ($fmt:expr) => (crate::errors::ParquetError::Invalid($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) =>
    (crate::errors::ParquetError::Invalid(format!($fmt, $($args),*)));
}

macro_rules! io_err {
  ($e:expr, $fmt:expr) => (crate::errors::ParquetError::Io($fmt.to_owned(), $e));
  ($e:expr, $fmt:expr, $($args:expr),*) =>
    (crate::errors::ParquetError::Io(format!($fmt, $($args),*), $e));
}
