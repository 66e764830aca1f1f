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

use std::collections::HashMap;

use crate::basic::Type;
use crate::schema::types::{ColumnDescPtr, ColumnPath, SchemaDescPtr};

/// Metadata for a Parquet file, as surfaced by the physical reader.
pub struct ParquetMetaData {
  file_metadata: FileMetaData,
  row_groups: Vec<RowGroupMetaData>
}

impl ParquetMetaData {
  pub fn new(file_metadata: FileMetaData, row_groups: Vec<RowGroupMetaData>) -> Self {
    ParquetMetaData { file_metadata, row_groups }
  }

  pub fn file_metadata(&self) -> &FileMetaData {
    &self.file_metadata
  }

  pub fn num_row_groups(&self) -> usize {
    self.row_groups.len()
  }

  pub fn row_group(&self, i: usize) -> &RowGroupMetaData {
    &self.row_groups[i]
  }

  pub fn row_groups(&self) -> &[RowGroupMetaData] {
    &self.row_groups
  }
}

/// File level metadata.
pub struct FileMetaData {
  num_rows: i64,
  created_by: Option<String>,
  key_value_metadata: Option<HashMap<String, String>>,
  schema_descr: SchemaDescPtr
}

impl FileMetaData {
  pub fn new(
    num_rows: i64,
    created_by: Option<String>,
    key_value_metadata: Option<HashMap<String, String>>,
    schema_descr: SchemaDescPtr
  ) -> Self {
    FileMetaData { num_rows, created_by, key_value_metadata, schema_descr }
  }

  pub fn num_rows(&self) -> i64 {
    self.num_rows
  }

  pub fn created_by(&self) -> Option<&String> {
    self.created_by.as_ref()
  }

  pub fn key_value_metadata(&self) -> Option<&HashMap<String, String>> {
    self.key_value_metadata.as_ref()
  }

  pub fn schema_descr(&self) -> &SchemaDescPtr {
    &self.schema_descr
  }
}

/// Metadata for a row group.
pub struct RowGroupMetaData {
  columns: Vec<ColumnChunkMetaData>,
  num_rows: i64
}

impl RowGroupMetaData {
  pub fn new(columns: Vec<ColumnChunkMetaData>, num_rows: i64) -> Self {
    RowGroupMetaData { columns, num_rows }
  }

  pub fn num_columns(&self) -> usize {
    self.columns.len()
  }

  pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
    &self.columns[i]
  }

  pub fn columns(&self) -> &[ColumnChunkMetaData] {
    &self.columns
  }

  pub fn num_rows(&self) -> i64 {
    self.num_rows
  }
}

/// Metadata for a column chunk.
pub struct ColumnChunkMetaData {
  column_type: Type,
  column_path: ColumnPath,
  num_values: i64
}

impl ColumnChunkMetaData {
  pub fn new(column_descr: &ColumnDescPtr, num_values: i64) -> Self {
    ColumnChunkMetaData {
      column_type: column_descr.physical_type(),
      column_path: column_descr.path().clone(),
      num_values
    }
  }

  /// Type of this column. Must be primitive.
  pub fn column_type(&self) -> Type {
    self.column_type
  }

  /// Path (or identifier) of this column.
  pub fn column_path(&self) -> &ColumnPath {
    &self.column_path
  }

  /// Total number of level entries in this column chunk, nulls included.
  pub fn num_values(&self) -> i64 {
    self.num_values
  }
}
