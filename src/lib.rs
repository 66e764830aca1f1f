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

//! Assembles Dremel-shredded Parquet leaf columns into Arrow-style
//! in-memory columnar arrays.
//!
//! The physical layer (page decoding, decompression, footer parsing) is
//! consumed through the traits in [`file::reader`] and [`column::reader`];
//! this crate owns the nested reassembly: definition/repetition level
//! interpretation, validity bitmaps, list offsets and struct composition.
//! See [`arrow::reader::ArrowReader`] for the entry point.

#![allow(non_camel_case_types)]

#[macro_use]
pub mod errors;

pub mod basic;
pub mod data_type;
pub mod util;
pub mod schema;
pub mod column;
pub mod file;
pub mod arrow;
