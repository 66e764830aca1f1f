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

use crate::column::reader::ColumnReader;
use crate::errors::Result;
use crate::file::metadata::{ParquetMetaData, RowGroupMetaData};

// ----------------------------------------------------------------------
// APIs for the physical file & row group readers

/// Physical Parquet file reader API. With this, one can get metadata
/// information about the file and readers for each row group.
///
/// Implementations must allow concurrent access to distinct column chunks:
/// the per-field read tasks each drive a disjoint set of columns from
/// worker threads sharing one reader.
pub trait FileReader: Send + Sync {
  /// Get metadata information about this file.
  fn metadata(&self) -> &ParquetMetaData;

  /// Get the `i`th row group reader. The result metadata is owned by this
  /// file reader.
  fn get_row_group<'a>(&'a self, i: usize) -> Result<Box<dyn RowGroupReader + 'a>>;
}

/// Physical row group reader API, giving access to the column chunks of
/// one row group.
pub trait RowGroupReader {
  /// Get metadata information about this row group.
  fn metadata(&self) -> &RowGroupMetaData;

  /// Get the reader for the `i`th column chunk.
  fn get_column_reader(&self, i: usize) -> Result<ColumnReader>;
}
