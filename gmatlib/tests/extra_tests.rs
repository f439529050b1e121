use gmatlib::Matrix;

#[test]
fn new_matrix_is_all_zero()
{
    let m = Matrix::<f64>::new(3, 3);
    for i in 0..3
    {
        for j in 0..3
        {
            assert_eq!(m.get(i, j).unwrap(), 0.0);
        }
    }
}

#[test]
fn row_scale_is_in_place()
{
    let mut m = Matrix::from_vec(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    m.inplace_row_scale(0, 2.0).unwrap();
    assert_eq!(m[(0, 0)], 2.0);
    assert_eq!(m[(0, 1)], 4.0);
    assert_eq!(m[(1, 0)], 3.0);
}

#[test]
fn scaled_row_add_combines_rows()
{
    let mut m = Matrix::from_vec(2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
    m.inplace_scaled_row_add(0, 1, 3.0).unwrap();
    assert_eq!(m[(0, 0)], 1.0);
    assert_eq!(m[(0, 1)], 3.0);
}

#[test]
fn row_swap_out_of_range_errors()
{
    let mut m = Matrix::<f64>::new(2, 2);
    assert!(m.inplace_row_swap(0, 9).is_err());
}

#[test]
fn multiply_dimension_mismatch_errors()
{
    let a = Matrix::<f64>::new(2, 3);
    let b = Matrix::<f64>::new(2, 3);
    assert!(a.multiply_matrix(&b).is_err());
}

#[test]
fn from_col_vec_builds_a_column()
{
    let v = Matrix::from_col_vec(vec![1.0, 2.0, 3.0]);
    assert_eq!(v.get_rows(), 3);
    assert_eq!(v.get_cols(), 1);
}
