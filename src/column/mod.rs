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

//! Low level column chunk reader API.
//!
//! This is the boundary to the physical layer: a column chunk reader
//! produces raw decoded values together with their definition and
//! repetition level streams, leaving all spacing and reassembly decisions
//! to the caller. Use [`reader::get_typed_column_reader`] to go from the
//! type-tagged [`reader::ColumnReader`] to a typed one.

pub mod reader;
