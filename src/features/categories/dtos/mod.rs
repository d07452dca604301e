pub mod category_dto;

pub use category_dto::{
    CategoryOptionDto, CategoryOptionsQuery, CategoryResponseDto, CategoryRowDto,
    CategoryRowsQuery, CategoryTreeDto, CreateCategoryDto, ListCategoriesQuery, UpdateCategoryDto,
};
