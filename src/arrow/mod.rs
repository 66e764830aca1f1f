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

//! Assembly of shredded leaf columns into Arrow-style arrays and tables.
//!
//! [`reader::ArrowReader`] is the entry point: it maps the file schema
//! through [`schema`], builds an assembler tree per top-level field with
//! [`array_reader::build_array_reader`], and fans the per-field reads out
//! over a [`reader::TaskRunner`].

pub mod array;
pub mod array_reader;
pub mod datatypes;
pub mod reader;
pub mod schema;
