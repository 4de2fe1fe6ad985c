pub mod db_index_util;
